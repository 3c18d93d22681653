pub mod link_server;
