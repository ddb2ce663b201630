//! Tests for packer-teamcity.
//!
//! Some of these tests test specific error message output.
//! It's okay to update the test if the change to the error message output is _desired_,
//! but these tests exist to make sure that any change to previously shipped error message output is _intentional_.

automod::dir!("tests/it");
