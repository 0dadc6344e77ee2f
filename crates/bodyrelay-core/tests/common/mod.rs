pub mod collector_server;
