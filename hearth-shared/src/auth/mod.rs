/// Account credential helpers
///
/// - [`password`]: Argon2id hashing and the sign-up length rule
/// - [`passcode`]: the shared passcode that gates account creation

pub mod passcode;
pub mod password;
