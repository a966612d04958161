use beaconcore::model::{LatLng, Rgb};
use beaconcore::surface::{Feature, HeatGrid, HeatOptions, Layer, Scene, Viewport};
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Theme,
};

/// Draws a [`Scene`] through a Web-Mercator [`Viewport`].
pub struct MapCanvas<'a> {
    pub scene: &'a Scene,
    pub viewport: Viewport,
}

fn color(rgb: Rgb) -> Color {
    let [r, g, b] = rgb.to_unit();
    Color::from_rgb(r, g, b)
}

/// Blue for sparse cells through green to red for the densest.
fn heat_color(intensity: f32, options: &HeatOptions) -> Color {
    let alpha = options.min_opacity + (1.0 - options.min_opacity) * intensity;
    let green = 1.0 - (2.0 * intensity - 1.0).abs();
    Color::from_rgba(intensity, green, 1.0 - intensity, alpha)
}

impl MapCanvas<'_> {
    fn to_screen(&self, position: LatLng, bounds: &Rectangle) -> Point {
        let (x, y) = self.viewport.project(position, bounds.width, bounds.height);
        Point::new(x, y)
    }

    fn draw_heat(&self, frame: &mut Frame, points: &[LatLng], options: &HeatOptions, bounds: &Rectangle) {
        let projected = points.iter().map(|point| {
            let screen = self.to_screen(*point, bounds);
            (screen.x, screen.y)
        });
        let grid = HeatGrid::accumulate(projected, bounds.width, bounds.height, options.radius);
        let size = iced::Size::new(grid.cell_size(), grid.cell_size());
        for (x, y, intensity) in grid.hot_cells() {
            frame.fill_rectangle(Point::new(x, y), size, heat_color(intensity, options));
        }
    }
}

impl<Message> canvas::Program<Message> for MapCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.06, 0.07, 0.09),
        );

        for (layer, feature) in self.scene.visible_features() {
            match feature {
                Feature::Heat { points, options } => {
                    self.draw_heat(&mut frame, points, options, &bounds);
                }
                Feature::Polyline { path, color: rgb } => {
                    if path.len() < 2 {
                        continue;
                    }
                    let line = Path::new(|builder| {
                        for (i, position) in path.iter().enumerate() {
                            let point = self.to_screen(*position, &bounds);
                            if i == 0 {
                                builder.move_to(point);
                            } else {
                                builder.line_to(point);
                            }
                        }
                    });
                    frame.stroke(
                        &line,
                        Stroke::default().with_width(3.0).with_color(color(*rgb)),
                    );
                }
                Feature::Point { position, style } => {
                    let center = self.to_screen(*position, &bounds);
                    let radius = if layer == Layer::BeaconMarkers { 6.0 } else { 4.0 };
                    let marker = Path::new(|builder| builder.circle(center, radius));
                    frame.fill(&marker, color(style.color));
                    if let Some(label) = &style.label {
                        frame.fill_text(canvas::Text {
                            content: label.clone(),
                            position: Point::new(center.x + radius + 2.0, center.y - 6.0),
                            color: Color::WHITE,
                            size: iced::Pixels(12.0),
                            ..canvas::Text::default()
                        });
                    }
                }
            }
        }

        vec![frame.into_geometry()]
    }
}
