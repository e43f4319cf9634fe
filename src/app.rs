use crate::theme::Theme;
use eframe::egui::{self, Align, Layout, RichText, ScrollArea, TextStyle};
use infinitive::assistant::Role;
use infinitive::config::Config;
use infinitive::event::EventReceiver;
use infinitive::typing::{TypingAnimation, Typewriter};
use infinitive::{Identity, IdentityEvent, Workspace};
use std::fs;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{info, warn};

const BUSY_REPAINT: Duration = Duration::from_millis(100);
const ANIMATION_REPAINT: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Landing,
    SignIn,
    Dashboard,
}

pub struct InfinitiveApp {
    rx: EventReceiver,
    workspace: Workspace,
    runtime_handle: Handle,
    config: Config,
    theme: Theme,
    page: Page,
    headline: Option<TypingAnimation>,
    typing_indicator: Option<TypingAnimation>,
    email_input: String,
    sign_in_error: Option<String>,
    editor_buffer: String,
    chat_input: String,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    visuals_applied: bool,
}

impl InfinitiveApp {
    pub fn new(
        rx: EventReceiver,
        workspace: Workspace,
        runtime_handle: Handle,
        config: Config,
    ) -> Self {
        let editor_buffer = workspace.sync().document().content.clone();
        let mut app = Self {
            rx,
            workspace,
            runtime_handle,
            config,
            theme: Theme::default(),
            page: Page::Landing,
            headline: None,
            typing_indicator: None,
            email_input: String::new(),
            sign_in_error: None,
            editor_buffer,
            chat_input: String::new(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            visuals_applied: false,
        };
        app.enter_page(Page::Landing);
        app
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn enter_page(&mut self, page: Page) {
        self.page = page;
        self.headline = if page == Page::Landing {
            let typewriter = Typewriter::new(self.config.headline_phrases.clone(), self.config.typing);
            Some(TypingAnimation::spawn(&self.runtime_handle, typewriter))
        } else {
            None
        };
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(message) = self.workspace.apply_event(event) {
                        self.log_diagnostic(message);
                    }
                    self.scroll_to_bottom = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }

        let document = &self.workspace.sync().document().content;
        if *document != self.editor_buffer {
            self.editor_buffer = document.clone();
        }
    }

    fn sync_typing_indicator(&mut self) {
        let pending = self.workspace.assistant().is_pending();
        match (pending, self.typing_indicator.is_some()) {
            (true, false) => {
                let typewriter = Typewriter::new(vec!["Typing...".to_string()], self.config.typing);
                self.typing_indicator = Some(TypingAnimation::spawn(&self.runtime_handle, typewriter));
            }
            (false, true) => self.typing_indicator = None,
            _ => {}
        }
    }

    fn sign_in(&mut self) {
        match Identity::from_email(&self.email_input) {
            Some(identity) => {
                self.sign_in_error = None;
                self.workspace
                    .handle_identity(IdentityEvent::LoggedIn(identity));
                self.enter_page(Page::Dashboard);
            }
            None => self.sign_in_error = Some("Enter a valid email address".to_string()),
        }
    }

    fn sign_out(&mut self) {
        self.workspace.handle_identity(IdentityEvent::LoggedOut);
        self.chat_input.clear();
        self.email_input.clear();
        self.enter_page(Page::Landing);
    }

    fn submit_chat(&mut self) {
        if self.workspace.assistant_mut().submit(&self.chat_input) {
            self.chat_input.clear();
            self.scroll_to_bottom = true;
        }
    }

    fn export_preview(&mut self) {
        let Some(frame) = self.workspace.sync().renderer().frame() else {
            return;
        };
        let page = frame.host_page();
        let path = self.config.data_dir.join("preview.html");
        let result = fs::create_dir_all(&self.config.data_dir).and_then(|()| fs::write(&path, page));
        match result {
            Ok(()) => {
                info!(path = %path.display(), "preview exported");
                self.log_diagnostic(format!("preview written to {}", path.display()));
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to export preview");
                self.log_diagnostic(format!("failed to export preview: {err}"));
            }
        }
    }

    fn save_status(&self) -> (&'static str, egui::Color32) {
        let sync = self.workspace.sync();
        if sync.is_loading() {
            ("Loading...", self.theme.text_muted)
        } else if sync.last_persist_error().is_some() {
            ("Save failed", self.theme.danger)
        } else if sync.has_unsaved_changes() {
            ("Saving...", self.theme.warning)
        } else {
            ("Saved", self.theme.success)
        }
    }

    fn render_landing(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("landing_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Infinitive.app");
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Login / Sign up").clicked() {
                        self.enter_page(Page::SignIn);
                    }
                });
            });
        });

        let headline = self
            .headline
            .as_ref()
            .map(TypingAnimation::current)
            .unwrap_or_default();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.label(
                    RichText::new("Build anything with")
                        .text_style(TextStyle::Name("headline".into()))
                        .strong(),
                );
                ui.label(
                    RichText::new(format!("{headline}|"))
                        .text_style(TextStyle::Name("headline".into()))
                        .color(self.theme.accent_secondary)
                        .strong(),
                );
                ui.add_space(self.theme.spacing_12);
                ui.label(
                    RichText::new(
                        "Write HTML on the left, watch it render on the right, and ask the assistant when you get stuck.",
                    )
                    .color(self.theme.text_muted),
                );
            });
        });
        ctx.request_repaint_after(ANIMATION_REPAINT);
    }

    fn render_sign_in(&mut self, ctx: &egui::Context) {
        let mut submit = false;
        let mut back = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                self.theme.panel_frame(self.theme.surface_1).show(ui, |ui| {
                    ui.set_max_width(360.0);
                    ui.heading("Sign in");
                    ui.label("Email");
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.email_input)
                            .desired_width(f32::INFINITY)
                            .hint_text("you@example.com"),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit = true;
                    }
                    if let Some(error) = &self.sign_in_error {
                        ui.label(RichText::new(error).color(self.theme.danger));
                    }
                    submit |= ui.button("Continue").clicked();
                    back = ui.button("Back to home").clicked();
                });
            });
        });

        if submit {
            self.sign_in();
        } else if back {
            self.sign_in_error = None;
            self.enter_page(Page::Landing);
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let (status_label, status_color) = self.save_status();
        let email = self
            .workspace
            .identity()
            .map(|identity| identity.email.clone())
            .unwrap_or_default();
        let mut log_out = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Infinitive.app")
                        .strong()
                        .color(self.theme.accent_secondary),
                );
                ui.separator();
                ui.label(RichText::new(format!("User: {email}")).color(self.theme.text_muted));
                ui.separator();
                ui.label(RichText::new(status_label).color(status_color));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    log_out = ui.button("Log Out").clicked();
                });
            });
        });
        if log_out {
            self.sign_out();
        }
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("chat_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading(RichText::new("Agent AI").color(self.theme.accent_secondary));
                ui.separator();

                let transcript_height = (ui.available_height() - 170.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in self.workspace.assistant().transcript() {
                            let (fill, layout) = match message.role() {
                                Role::User => (self.theme.user_bubble, Layout::right_to_left(Align::Min)),
                                Role::Assistant => {
                                    (self.theme.assistant_bubble, Layout::left_to_right(Align::Min))
                                }
                            };
                            ui.with_layout(layout, |ui| {
                                self.theme.bubble_frame(fill).show(ui, |ui| {
                                    ui.set_max_width(ui.available_width() * 0.85);
                                    ui.label(message.content());
                                });
                            });
                        }

                        if let Some(indicator) = &self.typing_indicator {
                            self.theme
                                .bubble_frame(self.theme.assistant_bubble)
                                .show(ui, |ui| {
                                    ui.label(
                                        RichText::new(indicator.current()).color(self.theme.text_muted),
                                    );
                                });
                        }

                        if self.scroll_to_bottom {
                            ui.scroll_to_cursor(Some(Align::BOTTOM));
                        }
                    });
                self.scroll_to_bottom = false;

                ui.separator();
                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(entry);
                                }
                            });
                    });

                ui.separator();
                let pending = self.workspace.assistant().is_pending();
                let hint = if pending {
                    "Waiting for response..."
                } else {
                    "Ask me anything..."
                };
                let mut send_now = false;
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        !pending,
                        egui::TextEdit::singleline(&mut self.chat_input)
                            .desired_width(ui.available_width() - 70.0)
                            .hint_text(hint),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }
                    send_now |= ui
                        .add_enabled(
                            !pending && !self.chat_input.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                });
                if send_now {
                    self.submit_chat();
                }
            });
    }

    fn render_preview_panel(&mut self, ctx: &egui::Context) {
        let mut export = false;
        egui::SidePanel::right("preview_panel")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Live Preview").color(self.theme.accent_secondary));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        export = ui.button("Export").clicked();
                    });
                });
                ui.separator();

                let Some(frame) = self.workspace.sync().renderer().frame() else {
                    return;
                };
                ui.label(
                    RichText::new(format!("sandbox: {}", frame.capabilities().sandbox_attribute()))
                        .small()
                        .color(self.theme.text_muted),
                );
                self.theme.preview_frame().show(ui, |ui| {
                    ui.set_min_size(ui.available_size());
                    ScrollArea::vertical().id_salt("preview").show(ui, |ui| {
                        if let Some(title) = frame.title() {
                            ui.label(
                                RichText::new(title)
                                    .small()
                                    .color(self.theme.text_muted),
                            );
                        }
                        for line in frame.lines() {
                            ui.label(RichText::new(line).color(self.theme.preview_ink));
                        }
                    });
                });
            });
        if export {
            self.export_preview();
        }
    }

    fn render_editor(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(RichText::new("Code Editor").color(self.theme.accent_secondary));
            ui.separator();
            ScrollArea::vertical().id_salt("editor").show(ui, |ui| {
                let response = ui.add_sized(
                    ui.available_size(),
                    egui::TextEdit::multiline(&mut self.editor_buffer)
                        .code_editor()
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    self.workspace
                        .sync_mut()
                        .apply_edit(self.editor_buffer.clone());
                }
            });
        });
    }

    fn render_dashboard(&mut self, ctx: &egui::Context) {
        self.sync_typing_indicator();
        self.render_top_bar(ctx);
        if self.page != Page::Dashboard {
            return;
        }
        self.render_chat_panel(ctx);
        self.render_preview_panel(ctx);
        self.render_editor(ctx);

        let animating = self.typing_indicator.is_some();
        let busy = self.workspace.sync().is_loading() || self.workspace.sync().has_unsaved_changes();
        if animating {
            ctx.request_repaint_after(ANIMATION_REPAINT);
        } else if busy {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}

impl eframe::App for InfinitiveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }
        self.drain_events();
        match self.page {
            Page::Landing => self.render_landing(ctx),
            Page::SignIn => self.render_sign_in(ctx),
            Page::Dashboard => self.render_dashboard(ctx),
        }
    }
}
