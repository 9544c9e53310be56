pub mod code;
pub mod email;
pub mod validation;

pub use code::{code_matches, generate_code, hash_code, is_well_formed_code, CODE_LENGTH};
pub use email::normalize_email;
pub use validation::ValidatedJson;
