// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use pe3d_downloader::application::HostSurface;
use pe3d_downloader::domain::models::layer::ExtractedLayer;
use pe3d_downloader::portal::captcha::CaptchaImage;
use std::path::PathBuf;

/// 记录流水线所有输出的宿主
pub struct RecordingHost {
    destination: Option<PathBuf>,
    load: bool,
    pub statuses: Mutex<Vec<String>>,
    pub progress: Mutex<Vec<u8>>,
    pub captchas: Mutex<usize>,
    pub layers: Mutex<Vec<String>>,
    pub load_prompts: Mutex<Vec<usize>>,
}

impl RecordingHost {
    pub fn new(destination: Option<PathBuf>, load: bool) -> Self {
        Self {
            destination,
            load,
            statuses: Mutex::new(Vec::new()),
            progress: Mutex::new(Vec::new()),
            captchas: Mutex::new(0),
            layers: Mutex::new(Vec::new()),
            load_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().last().cloned()
    }

    pub fn saw_status(&self, message: &str) -> bool {
        self.statuses.lock().iter().any(|s| s == message)
    }

    pub fn captcha_count(&self) -> usize {
        *self.captchas.lock()
    }
}

#[async_trait]
impl HostSurface for RecordingHost {
    fn show_status(&self, message: &str) {
        self.statuses.lock().push(message.to_string());
    }

    fn show_progress(&self, percent: u8) {
        self.progress.lock().push(percent);
    }

    fn show_captcha(&self, _image: &CaptchaImage) {
        *self.captchas.lock() += 1;
    }

    fn register_layer(&self, layer: &ExtractedLayer) {
        self.layers.lock().push(layer.name.clone());
    }

    async fn choose_destination(&self) -> Option<PathBuf> {
        self.destination.clone()
    }

    async fn confirm_load(&self, downloaded: usize) -> bool {
        self.load_prompts.lock().push(downloaded);
        self.load
    }
}
