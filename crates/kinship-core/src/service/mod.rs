//! Application services: mutation commands, detection queries, and
//! denormalization maintenance.

pub mod denorm;
pub mod detect;
pub mod mutate;

pub use denorm::{recompute_family, refresh_member};
pub use detect::{DetectOutcome, Detection, detect_relationship};
pub use mutate::{
    EdgeSpec, NewMember, create_member, create_relationship, delete_member, delete_relationship,
    recompute_denormalized, update_relationship,
};
