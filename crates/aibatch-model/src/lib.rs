mod domain;
pub use domain::{ArtifactKind, Flag, Labels};
pub use domain::{join_key, normalize_key};
pub use domain::{LABEL_PURPOSE, LABEL_PURPOSE_MODEL_STORAGE, defaults};

mod error;
pub use error::{ModelError, ModelResult};

mod naming;
pub use naming::{MAX_ACCOUNT_ID_LEN, MAX_RESOURCE_NAME_LEN, Namer, compose_name};

mod spec;
pub use spec::{
    InputSpec, JobSpec, MachineSpec, ModelSource, OutputSpec, ReplicaBounds, ResolvedJobSpec,
};
