pub mod keys;
pub mod keystore;

pub use keys::{verify_signature, UserKeyPair};
pub use keystore::{KeystoreCodec, Pkcs12Codec, UserKeystore};
