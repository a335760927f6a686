use rand::rngs::StdRng;
use rand::SeedableRng;
use statusmaker::style::gradient::{hsl_gradient_css, random_hues};
use statusmaker::style::LinearGradient;

#[test]
fn hue_spacing_over_ten_thousand_samples() {
    let mut rng = StdRng::seed_from_u64(0x5747_4154);
    for _ in 0..10_000 {
        let [h1, h2, h3] = random_hues(&mut rng);
        assert!(h1 < 360, "hue1 {}", h1);
        let d12 = (h2 + 360 - h1) % 360;
        let d23 = (h3 + 360 - h2) % 360;
        assert!((60..180).contains(&d12), "{} -> {}", h1, h2);
        assert!((60..180).contains(&d23), "{} -> {}", h2, h3);
    }
}

#[test]
fn generated_css_parses_back() {
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..100 {
        let css = hsl_gradient_css(random_hues(&mut rng));
        let g = LinearGradient::parse(&css).expect("generated gradient parses");
        assert_eq!(g.stops.len(), 3);
        assert!((g.angle_for(360.0, 640.0) - 135.0).abs() < 1e-4);
    }
}
