use super::test_helpers::*;
use super::*;
use crate::progress::StreamSignal;
use crate::request::{AudioCodec, DownloadKind, FormatChange, Quality, VideoContainer};
use crate::transport::Frame;
use crate::types::{ProgressEvent, ProgressStatus, Severity};


const URL_A: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
const URL_B: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";
