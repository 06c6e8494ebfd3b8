mod artifact;
pub use artifact::ArtifactKind;

mod flag;
pub use flag::Flag;

mod labels;
pub use labels::Labels;

mod constants;
pub use constants::{LABEL_PURPOSE, LABEL_PURPOSE_MODEL_STORAGE, defaults};

mod key;
pub use key::{join_key, normalize_key};
