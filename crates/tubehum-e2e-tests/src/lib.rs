mod test_utils;

pub use test_utils::{
    FAKE_COLLECTION_URL, FAKE_EMPTY_COLLECTION_URL, FAKE_SINGLE_URL, create_test_config,
    fake_yt_dlp, init_tracing, setup_test_environment,
};
