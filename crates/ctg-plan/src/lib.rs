pub mod spec;

pub use spec::{
    load_plan_from_path, resolve_plan, validate, ComparisonPlan, PairSpec, ResolvedPlan,
    ResolvedStraight, StraightSpec, DEFAULT_STRAIGHT_TITLE, DEFAULT_THRESHOLD,
};
