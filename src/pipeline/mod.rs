pub mod evidence;
pub mod generation;
pub mod orchestrator; // claim → streamed analysis ∥ literature → report
pub mod stream_guard; // degenerate-output watchdog for streaming generation
pub mod structuring;
