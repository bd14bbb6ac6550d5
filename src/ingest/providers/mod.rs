// src/ingest/providers/mod.rs
pub mod apple;
pub mod spotify;
pub mod youtube;

pub use apple::AppleNormalizer;
pub use spotify::SpotifyNormalizer;
pub use youtube::YoutubeNormalizer;
