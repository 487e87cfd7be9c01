//! Print the GraphQL schema as SDL.
//!
//! Usage: `cargo run --bin export_schema > schema.graphql`

#![allow(clippy::print_stdout)]

use soundcards_api::graphql::schema_builder;

fn main() {
    print!("{}", schema_builder().finish().sdl());
}
