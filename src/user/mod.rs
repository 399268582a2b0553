pub mod info;
pub mod profile;

pub use info::{UserInfo, UserProfile};
pub use profile::{load_profiles_file, InMemoryProfiles, UserProfileResolver};
