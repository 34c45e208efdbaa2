//! Built-in demonstration corpus
//!
//! Ten short fragments and a placeholder query, used by `vectext demo` and
//! by the end-to-end tests.

/// Sample fragments ingested by the demo
pub const DEMO_CORPUS: [&str; 10] = [
    "Hello, world!",
    "The quick brown fox jumps over the lazy dog.",
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
    "Nulla facilisi. Sed ut imperdiet nunc.",
    "Vestibulum ante ipsum primis in faucibus orci luctus et ultrices posuere cubilia Curae; Donec eget nunc.",
    "Vivamus auctor, nunc nec lacinia tincidunt, nunc nunc fermentum nunc, nec fermentum nunc nunc nec nunc.",
    "Error sit voluptatem accusantium doloremque laudantium, totam rem aperiam, eaque ipsa quae ab illo inventore veritatis et quasi architecto beatae vitae dicta sunt explicabo.",
    "Error (2) Co-pilot, engage the hyperdrive!",
    "Error (3) Co-pilot, engage the hyperdrive!",
    "Error Co-pilot this is not sensible log messages!",
];

/// Query run against the demo corpus
pub const DEMO_QUERY: &str = "A commonly used latin phrase as placeholder text";
