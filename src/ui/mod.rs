use crate::app::CondenseApp;
use crate::config::{CompressionLevel, FrameLimit, Resolution, SettingUpdate};
use crate::constants::{APP_NAME, STATUS_REFRESH_INTERVAL_MS};
use crate::presets::{self, PresetId};
use eframe::egui;

impl eframe::App for CondenseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_status();

        let dropped: Vec<_> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.handle_dropped(dropped);
        }

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(15)).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(egui::RichText::new(APP_NAME).size(24.0).color(egui::Color32::WHITE).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⚙ Settings").clicked() {
                            self.show_settings = true;
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(10.0);
            self.show_source_card(ui);
            ui.add_space(15.0);
            self.show_controls(ui);
        });

        self.show_settings_window(ctx);

        if self.services.is_running() {
            ctx.request_repaint_after(std::time::Duration::from_millis(STATUS_REFRESH_INTERVAL_MS));
        }
    }
}

impl CondenseApp {
    fn show_source_card(&mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(egui::Color32::from_gray(30))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(45)))
            .rounding(10.0)
            .inner_margin(20.0)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Drop a video here or").color(egui::Color32::LIGHT_GRAY));
                    ui.add_space(6.0);
                    if ui.add_sized([160.0, 30.0], egui::Button::new("📁 Select Video")).clicked() {
                        self.select_input();
                    }
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(self.source_label()).strong());
                });
            });
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let running = self.services.is_running();

        ui.vertical_centered(|ui| {
            ui.horizontal(|ui| {
                let compress_button = egui::Button::new(egui::RichText::new("🚀 Compress").size(16.0))
                    .min_size(egui::vec2(160.0, 40.0));
                if ui.add_enabled(!running, compress_button).clicked() {
                    self.start_compression();
                }

                let cancel_button = egui::Button::new(egui::RichText::new("⏹ Cancel").size(16.0))
                    .min_size(egui::vec2(120.0, 40.0));
                if ui.add_enabled(running, cancel_button).clicked() {
                    self.cancel_compression();
                }
            });

            ui.add_space(10.0);
            let status = self.status_text();
            let color = match self.services.query_status().failure() {
                Some(_) => egui::Color32::from_rgb(255, 120, 120),
                None => egui::Color32::LIGHT_GRAY,
            };
            if running {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new(status).color(color));
                });
            } else {
                ui.label(egui::RichText::new(status).color(color));
            }
        });
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;

        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                self.show_settings_grid(ui);
                ui.add_space(10.0);
                if ui.button("💾 Save").clicked() {
                    self.save_settings();
                }
            });

        self.show_settings = open;
    }

    fn show_settings_grid(&mut self, ui: &mut egui::Ui) {
        let settings = self.services.settings().clone();

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Preset:").strong());
                let mut preset = settings.preset;
                egui::ComboBox::from_id_source("preset")
                    .selected_text(preset.as_str())
                    .show_ui(ui, |ui| {
                        for id in PresetId::ALL {
                            let label = match presets::bundle(id) {
                                Some(bundle) => format!("{} - {}", id, bundle.description),
                                None => id.to_string(),
                            };
                            ui.selectable_value(&mut preset, id, label);
                        }
                    });
                if preset != settings.preset {
                    self.apply_preset(preset.as_str());
                }
                ui.end_row();

                ui.label(egui::RichText::new("Frame limit:").strong());
                let mut frame_limit = settings.frame_limit;
                egui::ComboBox::from_id_source("frame_limit")
                    .selected_text(frame_limit.as_str())
                    .show_ui(ui, |ui| {
                        for option in FrameLimit::ALL {
                            ui.selectable_value(&mut frame_limit, option, option.as_str());
                        }
                    });
                if frame_limit != settings.frame_limit {
                    self.services.update(SettingUpdate::FrameLimit(frame_limit));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Bitrate:").strong());
                let response = ui.add_sized(
                    [120.0, 22.0],
                    egui::TextEdit::singleline(&mut self.bitrate_input).hint_text("2000k"),
                );
                if response.lost_focus() {
                    self.commit_bitrate();
                }
                ui.end_row();

                ui.label(egui::RichText::new("Resolution:").strong());
                let mut resolution = settings.resolution;
                egui::ComboBox::from_id_source("resolution")
                    .selected_text(resolution.as_str())
                    .show_ui(ui, |ui| {
                        for option in Resolution::ALL {
                            ui.selectable_value(&mut resolution, option, option.as_str());
                        }
                    });
                if resolution != settings.resolution {
                    self.services.update(SettingUpdate::Resolution(resolution));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Compression:").strong());
                let mut level = settings.compression_level;
                egui::ComboBox::from_id_source("compression_level")
                    .selected_text(level.as_str())
                    .show_ui(ui, |ui| {
                        for option in CompressionLevel::ALL {
                            ui.selectable_value(&mut level, option, option.as_str());
                        }
                    });
                if level != settings.compression_level {
                    self.services.update(SettingUpdate::CompressionLevel(level));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Two-pass:").strong());
                let mut two_pass = settings.two_pass;
                if ui.checkbox(&mut two_pass, "Slower, more accurate bitrate").changed() {
                    self.services.update(SettingUpdate::TwoPass(two_pass));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Audio:").strong());
                let mut audio_enabled = settings.audio_enabled;
                if ui.checkbox(&mut audio_enabled, "Keep audio track").changed() {
                    self.services.update(SettingUpdate::AudioEnabled(audio_enabled));
                }
                ui.end_row();

                ui.label(egui::RichText::new("Output folder:").strong());
                ui.horizontal(|ui| {
                    let folder = settings
                        .output_folder()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| "Not set".to_string());
                    ui.label(folder);
                    if ui.button("📁 Choose").clicked() {
                        self.select_output_folder();
                    }
                });
                ui.end_row();
            });
    }
}
