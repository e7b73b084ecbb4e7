pub mod crew;
pub mod etl;
pub mod expr;
pub mod macros;
pub mod normalize;
pub mod protocol;
pub mod records;
pub mod registry;
pub mod schemas;
pub mod toolbelts;
pub mod travel;

pub use crew::{CrewOutput, TaskOutput};
pub use normalize::{Rendered, display_payload, normalize};
pub use records::{Record, RecordSet};
pub use registry::{get_tool_schema, get_tools_for, use_tool};
pub use schemas::{ParameterSchema, Tool, ToolSchema};
pub use travel::TravelInput;
