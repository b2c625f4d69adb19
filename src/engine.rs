// src/engine.rs
//
// The image staging engine: declare a source with one of the from_*() calls,
// then materialize it with load() or transform it with convert_to(), then
// optionally persist it with to_file()/save(). A successful load or convert
// commits a fresh buffer into the image at a single point; failures leave
// the image exactly as it was.
//
// This file is a facade over the decomposed modules in engine/.

mod convert;
mod io;
mod staging;

pub use staging::Image;
