pub mod direct_downloader;
pub mod ffmpeg;
pub mod filename;
pub mod http_client;
pub mod orchestrator;
pub mod process;
pub mod reporter;
pub mod url_parser;
