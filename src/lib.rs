pub mod cigar;
pub mod error;
pub mod projector;
pub mod record;
pub mod summary;
pub mod table;
pub mod translate;
pub mod tx2gen;

pub use cigar::{parse_cigar, CigarOp, CigarToken};
pub use error::{AlignmentError, CigarError, ErrorKind, Result, Tx2GenError};
pub use projector::{project, project_with, BoundaryPolicy, MappingStatus, Projection};
pub use record::{AlignmentRecord, Strand};
pub use summary::RunSummary;
pub use translate::{
    translate, PositionQuery, QueryError, TranscriptIndex, TranslationResult, TranslationRow,
};
pub use tx2gen::{run_tx2gen, Args};
