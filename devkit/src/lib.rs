/*!
# pathdiag DevKit - Stubs et utilitaires de test

Bibliothèque facilitant les tests du diagnostic de chemins avec:
- Consoles telnet simulées (serveur TCP local) pour tester sans GNS3
- Transport scripté en mémoire avec compteur d'appels
- Construction fluide d'inventaires et de labs complets
- Sorties VPCS / IOS et payloads GNS3 prêts à l'emploi
*/

pub mod console_stub;
pub mod fixtures;
pub mod test_utils;

pub use console_stub::{ConsoleScript, MockConsoleServer, ScriptedTransport};
pub use fixtures::Gns3PayloadBuilder;
pub use test_utils::{LabHarness, TopologyBuilder};
