pub mod accuracy;
pub mod bounds;
pub mod geom;
pub mod model;
pub mod projection;
pub mod reconcile;
pub mod report;
pub mod response;
pub mod vision;
