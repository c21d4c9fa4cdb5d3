pub mod password;
pub mod validation;

pub use password::{
    hash_password, verify_against_dummy, verify_password, warm_dummy_hash, Password,
    PasswordHashString,
};
pub use validation::ValidatedJson;
