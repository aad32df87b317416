pub mod classify_state;
