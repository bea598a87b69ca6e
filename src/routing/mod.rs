//! Model routing
//!
//! Picks which downstream language model should answer a query, using a
//! deterministic weighted scorer over a static capability matrix. No network
//! calls, no learned ranker; the same query and preferences always produce
//! the same decision.
//!
//! # Examples
//!
//! ```rust
//! use eventrag::routing::ModelRouter;
//!
//! let router = ModelRouter::with_builtin_catalog();
//! let decision = router.select_model("Write a function to parse ISO dates", None);
//! println!("{} -> {}", decision.selected_model, decision.reasoning);
//! ```

pub mod analyzer;
pub mod catalog;
pub mod router;

pub use analyzer::analyze_query;
pub use analyzer::QueryAnalysis;
pub use analyzer::QueryComplexity;
pub use analyzer::QueryDomain;
pub use analyzer::QueryRequirements;
pub use catalog::ModelCapability;
pub use catalog::ModelCatalog;
pub use router::ModelRecommendation;
pub use router::ModelRouter;
pub use router::RoutingDecision;
pub use router::RoutingPreferences;
