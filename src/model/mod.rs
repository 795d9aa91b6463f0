mod album;

pub use self::album::Album;
