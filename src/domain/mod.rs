// Domain module: the modeling vocabulary and its collaborator contracts

pub mod expression;
pub mod model;
pub mod records;
pub mod solver_service;
pub mod value_objects;

pub use expression::*;
pub use model::*;
pub use records::*;
pub use solver_service::*;
pub use value_objects::*;
