//! Configuration module for the converge reconcilers.
//!
//! This module handles all input-related functionality:
//! - Desired-state types for files and instances
//! - Parsing task documents and environment defaults
//! - Validation of desired state
//! - Content checksums

mod spec;
mod parser;
mod validator;
mod hash;

pub use spec::{
    CoreFraction, DesiredFileState, DesiredInstanceSpec, DiskType, InstanceState, Invocation,
    PlatformId, ProvisionerConfig, TaskArgs,
};
pub use parser::{
    ENV_YC_BIN, ENV_YC_FOLDER_ID, ENV_YC_IMAGE_ID, ENV_YC_PROFILE, ENV_YC_SUBNET_ID, ENV_YC_ZONE,
    TaskParser, apply_env_defaults,
};
pub use validator::{InputValidator, ValidationError, ValidationResult};
pub use hash::ContentHasher;
