pub mod classify_handler;
