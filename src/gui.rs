//! Options panel overlay.
//!
//! The panel is a fixed column of rows in the top-left corner: one slider per
//! numeric option, three sliders for the sphere colour channels and a toggle
//! for wireframe. Interaction is computed from [`Input`] alone, so the panel is
//! independent of the GPU; [`OptionsPanel::draw`] only emits rects and labels
//! into a [`Draw2d`].

use std::ops::RangeInclusive;

use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::color::Color;
use crate::draw2d::Draw2d;
use crate::input::Input;
use crate::options::{AnimationOptions, OptionChange};

const ORIGIN: Vec2 = Vec2::new(10.0, 10.0);
const WIDTH: f32 = 300.0;
const HEADER_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 24.0;
const LABEL_WIDTH: f32 = 110.0;
const VALUE_WIDTH: f32 = 52.0;
const PAD: f32 = 8.0;
const TRACK_HEIGHT: f32 = 12.0;

const ACCENT: Color = Color::hex(0x2f80ed);
const TEXT: Color = Color::rgb(0.9, 0.9, 0.9);

/// Axis-aligned screen rectangle in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }
}

/// A numeric option driven by a slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliderField {
    SphereX,
    SphereZ,
    SphereSpeed,
    ColorR,
    ColorG,
    ColorB,
    SpotAngle,
    SpotPenumbra,
    SpotIntensity,
}

impl SliderField {
    pub fn label(self) -> &'static str {
        match self {
            Self::SphereX => "sphereX",
            Self::SphereZ => "sphereZ",
            Self::SphereSpeed => "speed",
            Self::ColorR => "color R",
            Self::ColorG => "color G",
            Self::ColorB => "color B",
            Self::SpotAngle => "angle",
            Self::SpotPenumbra => "penumbra",
            Self::SpotIntensity => "intensity",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::SphereX | Self::SphereZ => AnimationOptions::SPHERE_POSITION_RANGE,
            Self::SphereSpeed => AnimationOptions::SPHERE_SPEED_RANGE,
            _ => AnimationOptions::UNIT_RANGE,
        }
    }

    pub fn get(self, options: &AnimationOptions) -> f32 {
        match self {
            Self::SphereX => options.sphere_x,
            Self::SphereZ => options.sphere_z,
            Self::SphereSpeed => options.sphere_speed,
            Self::ColorR => options.sphere_color.r,
            Self::ColorG => options.sphere_color.g,
            Self::ColorB => options.sphere_color.b,
            Self::SpotAngle => options.spot_angle,
            Self::SpotPenumbra => options.spot_penumbra,
            Self::SpotIntensity => options.spot_intensity,
        }
    }

    fn slot(self, options: &mut AnimationOptions) -> &mut f32 {
        match self {
            Self::SphereX => &mut options.sphere_x,
            Self::SphereZ => &mut options.sphere_z,
            Self::SphereSpeed => &mut options.sphere_speed,
            Self::ColorR => &mut options.sphere_color.r,
            Self::ColorG => &mut options.sphere_color.g,
            Self::ColorB => &mut options.sphere_color.b,
            Self::SpotAngle => &mut options.spot_angle,
            Self::SpotPenumbra => &mut options.spot_penumbra,
            Self::SpotIntensity => &mut options.spot_intensity,
        }
    }

    fn is_color(self) -> bool {
        matches!(self, Self::ColorR | Self::ColorG | Self::ColorB)
    }

    fn fill(self) -> Color {
        match self {
            Self::ColorR => Color::RED,
            Self::ColorG => Color::GREEN,
            Self::ColorB => Color::BLUE,
            _ => ACCENT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Row {
    Slider(SliderField),
    Wireframe,
}

pub const ROWS: [Row; 10] = [
    Row::Slider(SliderField::SphereX),
    Row::Slider(SliderField::SphereZ),
    Row::Slider(SliderField::SphereSpeed),
    Row::Slider(SliderField::ColorR),
    Row::Slider(SliderField::ColorG),
    Row::Slider(SliderField::ColorB),
    Row::Wireframe,
    Row::Slider(SliderField::SpotAngle),
    Row::Slider(SliderField::SpotPenumbra),
    Row::Slider(SliderField::SpotIntensity),
];

/// Interactive panel editing an [`AnimationOptions`] record.
#[derive(Debug, Default)]
pub struct OptionsPanel {
    collapsed: bool,
    dragging: Option<SliderField>,
}

impl OptionsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn header(&self) -> Rect {
        Rect::new(ORIGIN.x, ORIGIN.y, WIDTH, HEADER_HEIGHT)
    }

    /// Area covered by the panel in its current state.
    pub fn bounds(&self) -> Rect {
        let rows = if self.collapsed { 0 } else { ROWS.len() };
        Rect::new(
            ORIGIN.x,
            ORIGIN.y,
            WIDTH,
            HEADER_HEIGHT + rows as f32 * ROW_HEIGHT + if rows > 0 { PAD } else { 0.0 },
        )
    }

    pub fn row(&self, index: usize) -> Rect {
        Rect::new(
            ORIGIN.x,
            ORIGIN.y + HEADER_HEIGHT + index as f32 * ROW_HEIGHT,
            WIDTH,
            ROW_HEIGHT,
        )
    }

    /// Slider track, or toggle box, of a row.
    pub fn control(&self, index: usize) -> Rect {
        let row = self.row(index);
        let x = row.x + LABEL_WIDTH;
        let y = row.y + (ROW_HEIGHT - TRACK_HEIGHT) * 0.5;
        match ROWS.get(index) {
            Some(Row::Wireframe) => Rect::new(x, y, TRACK_HEIGHT, TRACK_HEIGHT),
            _ => Rect::new(x, y, WIDTH - LABEL_WIDTH - VALUE_WIDTH - PAD, TRACK_HEIGHT),
        }
    }

    /// Whether the camera should ignore the mouse this frame.
    pub fn wants_pointer(&self, input: &Input) -> bool {
        self.dragging.is_some() || self.bounds().contains(input.mouse_position())
    }

    /// Applies this frame's input, returning edits the scene must hear about.
    pub fn update(&mut self, input: &Input, options: &mut AnimationOptions) -> Vec<OptionChange> {
        let mut changes = Vec::new();
        let mouse = input.mouse_position();

        let header_clicked =
            input.mouse_pressed(MouseButton::Left) && self.header().contains(mouse);
        if input.key_pressed(KeyCode::Tab) || header_clicked {
            self.collapsed = !self.collapsed;
            self.dragging = None;
            log::debug!("Options panel collapsed: {}", self.collapsed);
        }
        if self.collapsed {
            return changes;
        }

        if input.mouse_pressed(MouseButton::Left) {
            for (i, row) in ROWS.iter().enumerate() {
                match row {
                    Row::Slider(field) if self.control(i).contains(mouse) => {
                        self.dragging = Some(*field);
                    }
                    Row::Wireframe if self.row(i).contains(mouse) => {
                        options.sphere_wireframe = !options.sphere_wireframe;
                        changes.push(OptionChange::SphereWireframe(options.sphere_wireframe));
                    }
                    _ => {}
                }
            }
        }

        if let Some(field) = self.dragging {
            if input.mouse_down(MouseButton::Left) {
                let index = ROWS
                    .iter()
                    .position(|r| *r == Row::Slider(field))
                    .unwrap_or_default();
                let track = self.control(index);
                let t = ((mouse.x - track.x) / track.w).clamp(0.0, 1.0);
                let range = field.range();
                let value = range.start() + t * (range.end() - range.start());

                let slot = field.slot(options);
                if *slot != value {
                    *slot = value;
                    if field.is_color() {
                        changes.push(OptionChange::SphereColor(options.sphere_color));
                    }
                }
            } else {
                self.dragging = None;
            }
        }

        changes
    }

    pub fn draw(&self, draw: &mut Draw2d, options: &AnimationOptions) {
        let bounds = self.bounds();
        draw.rect(bounds.x, bounds.y, bounds.w, bounds.h, Color::PANEL_BG);
        draw.rect_outline(bounds.x, bounds.y, bounds.w, bounds.h, 1.0, Color::PANEL_BORDER);

        let marker = if self.collapsed { "+" } else { "-" };
        draw.text(ORIGIN.x + PAD, ORIGIN.y + 4.0, &format!("{marker} Options  [Tab]"), TEXT);
        if self.collapsed {
            return;
        }

        for (i, row) in ROWS.iter().enumerate() {
            let r = self.row(i);
            let control = self.control(i);
            match row {
                Row::Slider(field) => {
                    let value = field.get(options);
                    let range = field.range();
                    let t = ((value - range.start()) / (range.end() - range.start())).clamp(0.0, 1.0);

                    draw.text(r.x + PAD, r.y + 4.0, field.label(), TEXT);
                    draw.rect(control.x, control.y, control.w, control.h, Color::PANEL_BORDER);
                    draw.rect(control.x, control.y, control.w * t, control.h, field.fill());
                    draw.text(
                        control.x + control.w + PAD,
                        r.y + 4.0,
                        &format_value(*field, value),
                        TEXT,
                    );
                }
                Row::Wireframe => {
                    draw.text(r.x + PAD, r.y + 4.0, "wireframe", TEXT);
                    draw.rect_outline(control.x, control.y, control.w, control.h, 1.0, TEXT);
                    if options.sphere_wireframe {
                        draw.rect(control.x + 3.0, control.y + 3.0, control.w - 6.0, control.h - 6.0, ACCENT);
                    }
                }
            }
        }
    }
}

fn format_value(field: SliderField, value: f32) -> String {
    match field {
        SliderField::SphereSpeed => format!("{value:.3}"),
        _ => format!("{value:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_point(panel: &OptionsPanel, field: SliderField, t: f32) -> Vec2 {
        let index = ROWS.iter().position(|r| *r == Row::Slider(field)).unwrap();
        let track = panel.control(index);
        Vec2::new(track.x + track.w * t, track.center().y)
    }

    fn click(input: &mut Input, p: Vec2) {
        input.begin_frame();
        input.set_cursor(p.x, p.y);
        input.press_button(MouseButton::Left);
    }

    #[test]
    fn clicking_a_track_sets_the_value() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();

        click(&mut input, track_point(&panel, SliderField::SphereX, 1.0));
        let changes = panel.update(&input, &mut options);

        assert!(changes.is_empty());
        assert!((options.sphere_x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn drag_follows_until_release() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();

        click(&mut input, track_point(&panel, SliderField::SpotIntensity, 0.5));
        panel.update(&input, &mut options);
        assert!((options.spot_intensity - 0.5).abs() < 1e-4);

        // Dragging far outside the track clamps to the end of the range.
        input.begin_frame();
        input.set_cursor(2000.0, 500.0);
        panel.update(&input, &mut options);
        assert_eq!(options.spot_intensity, 1.0);
        assert!(panel.wants_pointer(&input));

        input.begin_frame();
        input.release_button(MouseButton::Left);
        panel.update(&input, &mut options);
        input.begin_frame();
        input.set_cursor(track_point(&panel, SliderField::SpotIntensity, 0.0).x, 500.0);
        panel.update(&input, &mut options);
        assert_eq!(options.spot_intensity, 1.0);
        assert!(!panel.wants_pointer(&input));
    }

    #[test]
    fn color_sliders_report_the_new_color() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();

        click(&mut input, track_point(&panel, SliderField::ColorR, 1.0));
        let changes = panel.update(&input, &mut options);

        assert_eq!(changes, vec![OptionChange::SphereColor(Color::rgb(1.0, 0.0, 1.0))]);
    }

    #[test]
    fn wireframe_row_toggles() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();
        let index = ROWS.iter().position(|r| *r == Row::Wireframe).unwrap();

        click(&mut input, panel.row(index).center());
        assert_eq!(
            panel.update(&input, &mut options),
            vec![OptionChange::SphereWireframe(true)]
        );
        assert!(options.sphere_wireframe);

        // Holding the button does not toggle again.
        input.begin_frame();
        assert!(panel.update(&input, &mut options).is_empty());
        assert!(options.sphere_wireframe);
    }

    #[test]
    fn collapsed_panel_ignores_rows() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();
        let on_track = track_point(&panel, SliderField::SphereZ, 1.0);

        click(&mut input, panel.header().center());
        panel.update(&input, &mut options);
        assert!(panel.is_collapsed());
        input.release_button(MouseButton::Left);

        click(&mut input, on_track);
        panel.update(&input, &mut options);
        assert_eq!(options.sphere_z, 0.0);
        assert!(!panel.wants_pointer(&input));
    }

    #[test]
    fn clicks_outside_leave_options_alone() {
        let mut panel = OptionsPanel::new();
        let mut options = AnimationOptions::default();
        let mut input = Input::new();

        click(&mut input, Vec2::new(800.0, 400.0));
        assert!(panel.update(&input, &mut options).is_empty());
        assert_eq!(options, AnimationOptions::default());
        assert!(!panel.wants_pointer(&input));
    }
}
