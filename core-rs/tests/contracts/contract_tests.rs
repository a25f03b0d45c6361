//! Contract Tests - Access Invariant Protection
//!
//! This file aggregates all contract test modules.
//! Contract tests verify invariants that MUST NEVER BREAK.

// Contract test modules
mod contracts {
    // Permission evaluation and guard conventions
    mod access_convention {
        include!("access_convention_contracts.rs");
    }

    // Session store ordering rules
    mod session_generation {
        include!("session_generation_contracts.rs");
    }
}
