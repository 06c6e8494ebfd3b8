mod job;
pub use job::{JobSpec, ModelSource};

mod machine;
pub use machine::{MachineSpec, ReplicaBounds};

mod resolved;
pub use resolved::{InputSpec, OutputSpec, ResolvedJobSpec};
