/*!
# pathdiag kernel

Localise le premier saut défaillant entre deux nodes d'une topologie GNS3 :

1. graphe non orienté construit depuis les nodes et les links ([`topology`])
2. plus court chemin en nombre de sauts, BFS ([`path`])
3. sonde console de chaque node du chemin ([`transport`], [`parsers`], [`health`])
4. arrêt au premier verdict non sain ([`walker`], [`diagnosis`])

```rust,no_run
use pathdiag_kernel::{CancelSignal, Diagnostician, Inventory, NodeHealthChecker, PathWalker, TelnetTransport};

# async fn run(inventory: Inventory) -> pathdiag_kernel::Result<()> {
let checker = NodeHealthChecker::new(TelnetTransport::default());
let diagnostician = Diagnostician::new(PathWalker::new(checker));
let diagnosis = diagnostician.diagnose(&inventory, "PC1", "PC5", &CancelSignal::never()).await?;
println!("{diagnosis:?}");
# Ok(())
# }
```
*/

pub mod diagnosis;
pub mod error;
pub mod health;
pub mod models;
pub mod parsers;
pub mod path;
pub mod topology;
pub mod transport;
pub mod walker;

pub use diagnosis::{Diagnosis, Diagnostician};
pub use error::{DiagError, Result};
pub use health::{NodeHealthChecker, NodeVerdict, ProbeCommands};
pub use models::{ConsoleEndpoint, Inventory, Link, Node, NodeKind, NodesMap, PowerState};
pub use path::shortest_path;
pub use topology::{build_graph, Graph};
pub use transport::{ConsoleTransport, ProbeResult, ProbeSettings, TelnetTransport};
pub use walker::{cancel_pair, CancelHandle, CancelSignal, HopReport, PathOutcome, PathVerdict, PathWalker};
