pub mod result;

pub use result::{DocumentType, ExtractedInfo, RecognitionData, ResultRecord};
