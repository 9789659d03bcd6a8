//! Cross-crate scenarios for the readiness stack.

#[cfg(test)]
mod broker_scenarios;

#[cfg(test)]
mod session_flow;
