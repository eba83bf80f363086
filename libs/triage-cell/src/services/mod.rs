pub mod alerts;
pub mod chat;
pub mod decoder;
pub mod stream;
pub mod transcript;

pub use alerts::{AlertPlayer, SilentAlert};
pub use chat::ChatSession;
pub use decoder::LineDecoder;
pub use stream::{TriageStreamClient, TriageTransport};
pub use transcript::ChatTranscript;
