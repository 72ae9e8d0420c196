/// The fallible result of core operations, like spawning scheduler workers.
pub type Result<T> = ::std::result::Result<T, ::failure::Error>;
