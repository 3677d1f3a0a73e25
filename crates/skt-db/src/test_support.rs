//! Shared test utilities for skt-db unit tests.
