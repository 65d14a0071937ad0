//! Canned assistant replies.
//!
//! There is no model behind the assistant: every reply is drawn uniformly from
//! a small fixed table keyed by [`Mode`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::Mode;

const CHAT_RESPONSES: &[&str] = &[
    "I'm NexusAI, your intelligent assistant. I can help you with a wide range of topics — from brainstorming ideas to answering complex questions. What would you like to explore today?",
    "That's a great question! Let me think through this carefully. The key insight here is that combining multiple perspectives often leads to the most robust solutions. Here's my analysis...",
    "Absolutely! I'd be happy to dive deeper into that topic. There are several fascinating dimensions to consider here...",
];

const IMAGE_RESPONSES: &[&str] = &[
    "🎨 **Image Generation Mode Active**\n\nI can help you create stunning visuals! Describe what you'd like to generate:\n- **Style**: Photorealistic, digital art, watercolor, 3D render...\n- **Subject**: Landscapes, portraits, abstract, architectural...\n- **Mood**: Cinematic, dreamy, vibrant, minimal...\n\n*Your prompt has been processed and queued for generation.*",
    "✨ **Generating your image...**\n\nBased on your description, I'm crafting: a high-resolution concept with carefully balanced composition, dynamic lighting, and rich color palette. The generation model is applying artistic style transfer and upscaling for maximum quality.",
];

const MATH_RESPONSES: &[&str] = &[
    "📐 **Mathematical Analysis**\n\nLet me solve this step by step:\n\n**Given:** The equation you provided\n\n**Step 1:** Identify the variables and constants\n**Step 2:** Apply the appropriate theorem\n**Step 3:** Simplify and solve\n\n$$\\int_{0}^{\\infty} e^{-x^2} dx = \\frac{\\sqrt{\\pi}}{2}$$\n\n**Result:** The solution converges to the expected value with high precision.",
    "🔢 **Calculation Complete**\n\nUsing advanced numerical methods:\n- Applied **Gaussian elimination** for matrix operations\n- Used **Newton-Raphson** for iterative approximation\n- Verified with **symbolic computation**\n\n**Answer:** The expression evaluates to approximately **42.7831**",
];

const CODE_RESPONSES: &[&str] = &[
    "💻 **Code Analysis & Generation**\n\nHere's a clean, optimized implementation:\n\n```typescript\n// Efficient solution with O(n log n) complexity\nfunction processData<T>(items: T[], comparator: (a: T, b: T) => number): T[] {\n  return [...items]\n    .sort(comparator)\n    .filter((item, index, arr) => \n      index === 0 || comparator(item, arr[index - 1]) !== 0\n    );\n}\n\n// Usage example\nconst sorted = processData(data, (a, b) => a.id - b.id);\nconsole.log('Processed:', sorted.length, 'items');\n```\n\n**Complexity:** O(n log n) time, O(n) space\n**Features:** Generic types, immutable operations, duplicate filtering",
    "🚀 **Code Review Complete**\n\nI've analyzed your code and found several optimization opportunities:\n\n1. **Performance:** Replace nested loops with a hash map (O(n²) → O(n))\n2. **Readability:** Extract magic numbers into named constants\n3. **Safety:** Add input validation and error boundaries\n4. **Testing:** 3 edge cases need coverage\n\nHere's the refactored version with all improvements applied...",
];

/// Candidate replies for `mode`. Never empty.
pub fn canned_responses(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Chat => CHAT_RESPONSES,
        Mode::Image => IMAGE_RESPONSES,
        Mode::Math => MATH_RESPONSES,
        Mode::Code => CODE_RESPONSES,
    }
}

/// Source of uniformly distributed indices.
pub trait IndexSource {
    /// Returns an index in `0..len`. `len` is always at least 1.
    fn pick(&mut self, len: usize) -> usize;
}

impl IndexSource for StdRng {
    fn pick(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}

pub struct ResponseSimulator<S = StdRng> {
    source: S,
}

impl ResponseSimulator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<S: IndexSource> ResponseSimulator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn generate(&mut self, mode: Mode) -> &'static str {
        let responses = canned_responses(mode);
        let idx = self.source.pick(responses.len()).min(responses.len() - 1);
        responses[idx]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of indices, then keeps returning 0.
    pub(crate) struct Scripted(pub VecDeque<usize>);

    impl Scripted {
        pub(crate) fn new(picks: &[usize]) -> Self {
            Self(picks.iter().copied().collect())
        }
    }

    impl IndexSource for Scripted {
        fn pick(&mut self, _len: usize) -> usize {
            self.0.pop_front().unwrap_or(0)
        }
    }

    #[test]
    fn test_every_mode_has_two_or_three_responses() {
        for mode in Mode::ALL {
            let n = canned_responses(mode).len();
            assert!((2..=3).contains(&n), "{} has {} responses", mode, n);
        }
    }

    #[test]
    fn test_scripted_source_selects_exact_response() {
        let mut sim = ResponseSimulator::new(Scripted::new(&[2, 0, 1]));
        assert_eq!(sim.generate(Mode::Chat), CHAT_RESPONSES[2]);
        assert_eq!(sim.generate(Mode::Math), MATH_RESPONSES[0]);
        assert_eq!(sim.generate(Mode::Code), CODE_RESPONSES[1]);
    }

    #[test]
    fn test_out_of_range_pick_is_clamped() {
        let mut sim = ResponseSimulator::new(Scripted::new(&[99]));
        assert_eq!(sim.generate(Mode::Image), IMAGE_RESPONSES[1]);
    }

    #[test]
    fn test_seeded_rng_covers_whole_table() {
        let mut sim = ResponseSimulator::new(StdRng::seed_from_u64(7));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let reply = sim.generate(Mode::Chat);
            assert!(CHAT_RESPONSES.contains(&reply));
            seen.insert(reply);
        }
        assert_eq!(seen.len(), CHAT_RESPONSES.len());
    }

    #[test]
    fn test_code_reply_contains_fenced_block() {
        assert!(CODE_RESPONSES[0].contains("```typescript\n"));
    }
}
