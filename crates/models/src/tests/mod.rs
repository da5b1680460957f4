/// CRUD and referential behaviour against an in-memory sqlite database
pub mod crud_tests;
