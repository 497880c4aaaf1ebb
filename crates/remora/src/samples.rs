//! Built-in example diagrams.
//!
//! `SAMPLE_DIAGRAM` backs the CLI `--sample` action; `examples()` backs the HTTP
//! `/api/examples` endpoint. The source text is opaque to this crate, like all
//! Mermaid input.

use std::path::Path;

/// One named example diagram.
#[derive(Debug, Clone, Copy)]
pub struct ExampleDiagram {
    pub key: &'static str,
    pub name: &'static str,
    pub code: &'static str,
}

/// The sample written by the CLI `--sample` action.
pub const SAMPLE_DIAGRAM: &str = "graph TD
    A[Start] --> B{Have Mermaid code?}
    B -->|Yes| C[Convert to PNG]
    B -->|No| D[Write Mermaid code]
    C --> E[Save image]
    D --> C
    E --> F[Done]

    style A fill:#e1f5fe
    style F fill:#c8e6c9
    style C fill:#fff3e0
";

const EXAMPLES: &[ExampleDiagram] = &[
    ExampleDiagram {
        key: "flowchart",
        name: "Flowchart",
        code: "graph TD
    A[Start] --> B{Decision}
    B -->|Yes| C[Do the work]
    B -->|No| D[Do something else]
    C --> E[Finish]
    D --> E

    style A fill:#e1f5fe
    style E fill:#c8e6c9
    style C fill:#fff3e0",
    },
    ExampleDiagram {
        key: "sequence",
        name: "Sequence Diagram",
        code: "sequenceDiagram
    participant User
    participant System
    participant Database

    User->>System: Send request
    System->>Database: Query data
    Database-->>System: Return results
    System-->>User: Respond",
    },
    ExampleDiagram {
        key: "class",
        name: "Class Diagram",
        code: "classDiagram
    class Animal {
        +String name
        +int age
        +makeSound()
    }

    class Dog {
        +String breed
        +bark()
    }

    class Cat {
        +boolean indoor
        +meow()
    }

    Animal <|-- Dog
    Animal <|-- Cat",
    },
    ExampleDiagram {
        key: "pie",
        name: "Pie Chart",
        code: "pie title Language usage
    \"Python\" : 35
    \"JavaScript\" : 25
    \"Java\" : 20
    \"C++\" : 12
    \"Other\" : 8",
    },
    ExampleDiagram {
        key: "gitgraph",
        name: "Git Graph",
        code: "gitgraph
    commit id: \"Initial commit\"
    branch develop
    checkout develop
    commit id: \"Add feature A\"
    commit id: \"Fix bug\"
    checkout main
    merge develop
    commit id: \"Release v1.0\"",
    },
];

/// Ordered catalog of example diagrams.
pub fn examples() -> &'static [ExampleDiagram] {
    EXAMPLES
}

/// Writes [`SAMPLE_DIAGRAM`] to `path`.
pub fn write_sample(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, SAMPLE_DIAGRAM)
}
