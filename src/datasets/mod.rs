pub mod jsb_chorales;
pub mod lakh_midi;
pub mod maestro;

pub use jsb_chorales::JsbChoralesDataset;
pub use lakh_midi::LakhMidiDataset;
pub use maestro::MaestroDataset;
