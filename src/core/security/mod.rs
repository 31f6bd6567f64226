// Security module for path validation and access control
//
// Every filesystem-touching tool resolves user-supplied paths through
// `validate_path`, which checks them against the session allow-list both
// literally and after symlink resolution. The allow-list is seeded from the
// command line and replaced when the client announces its roots.

pub mod allowed_dirs;
pub mod containment;
pub mod normalize;
pub mod path_validator;
pub mod roots;

pub use allowed_dirs::AllowedDirectories;
pub use containment::is_path_within_allowed_directories;
pub use normalize::{PathStyle, expand_home, is_absolute_normalized, normalize_path};
pub use path_validator::{PathSecurityError, validate_path};
pub use roots::{
    RootError, RootSpecification, RootsReconciliation, SkippedRoot, reconcile_roots,
    resolve_root_directories, resolve_root_directory, resolve_startup_directories,
};
