pub mod backup_config;
pub mod generation;
pub mod invoker;
pub mod lock;
pub mod orchestrator;
pub mod result_error;
pub mod rotation;
pub mod sync;
pub mod validate;

macro_rules! function_path {
    () => {
        concat!(module_path!(), "::", function_name!(), " ", file!(), ":", line!())
    };
}

pub(crate) use function_path;
