mod action;
mod depend;
mod descriptor;
mod record;
mod settings;

pub use action::{ActionLedger, ActionType};
pub use depend::bare_dependency_name;
pub use descriptor::{
    descriptor_path, read_descriptor, remove_descriptor, write_descriptor, DescriptorError,
    OperationDescriptor, OperationKind, DESCRIPTOR_FILE_NAME, DESCRIPTOR_SCHEMA_VERSION,
};
pub use record::PackageRecord;
pub use settings::{expand_env, Settings};

#[cfg(test)]
mod tests;
