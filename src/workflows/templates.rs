//! Deterministic message bodies used when the remote model is unavailable.

use rand::Rng;

use crate::models::Platform;

/// Source of the single random choice the engine makes.
pub trait IndexPicker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPicker;

impl IndexPicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index (clamped to the pool).
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl IndexPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

pub fn greeting_pool(platform: Platform) -> &'static [&'static str; 3] {
    match platform {
        Platform::Linkedin => &["Hi there", "Hello", "Hey"],
        Platform::Email => &["Hello", "Hi", "Good day"],
        Platform::Upwork => &["Hello", "Hi there", "Greetings"],
        Platform::Instagram => &["Hey", "Hi", "Hello"],
    }
}

pub fn greeting(platform: Platform, client_name: Option<&str>, picker: &dyn IndexPicker) -> String {
    match client_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {}", name),
        None => {
            let pool = greeting_pool(platform);
            pool[picker.pick(pool.len())].to_string()
        }
    }
}

/// Renders the Direct, Value-First and Question-Based bodies, in that order.
pub fn render(platform: Platform, niche: &str, offer: &str, greeting: &str) -> [String; 3] {
    let n = niche.to_lowercase();
    match platform {
        Platform::Linkedin => [
            format!(
                "{greeting}! 👋\n\n\
                 I specialize in {n} and noticed your impressive work in the industry.\n\n\
                 {offer}\n\n\
                 I'd love to discuss how this could specifically benefit your business. Are you available for a quick 15-minute call this week?\n\n\
                 Best regards"
            ),
            format!(
                "{greeting}!\n\n\
                 Quick insight: Most businesses in {n} are missing out on 40% more leads due to outdated strategies.\n\n\
                 {offer}\n\n\
                 I've helped 20+ similar companies achieve breakthrough results. Would you be interested in a free 10-minute strategy session?\n\n\
                 Looking forward to connecting!"
            ),
            format!(
                "{greeting}!\n\n\
                 Question: What's your biggest challenge in {n} right now?\n\n\
                 {offer}\n\n\
                 I'm curious about your current approach and whether there's an opportunity to collaborate. Mind if I ask what's working best for you currently?\n\n\
                 Cheers!"
            ),
        ],
        Platform::Email => [
            format!(
                "Subject: {niche} Growth Opportunity - 15 Min Chat?\n\n\
                 {greeting},\n\n\
                 I hope this email finds you well. I specialize in helping businesses like yours excel in {n}.\n\n\
                 {offer}\n\n\
                 Based on my experience with similar companies, I believe this could be particularly valuable for your business. Would you be open to a brief conversation?\n\n\
                 Best regards"
            ),
            format!(
                "Subject: Free {niche} Audit Results Inside\n\n\
                 {greeting},\n\n\
                 I've been researching companies in your space and found some interesting opportunities for improvement.\n\n\
                 {offer}\n\n\
                 I'd like to share a few quick wins that could impact your bottom line immediately. No strings attached - just good insights.\n\n\
                 Would you be interested in a 10-minute call?"
            ),
            format!(
                "Subject: Quick Question About Your {niche} Strategy\n\n\
                 {greeting},\n\n\
                 I'm reaching out because I'm genuinely curious about your current {n} approach.\n\n\
                 {offer}\n\n\
                 What's been your biggest win in this area lately? And what's the one thing you'd change if you could?\n\n\
                 I'd love to exchange insights."
            ),
        ],
        Platform::Upwork => [
            format!(
                "{greeting}!\n\n\
                 Perfect match! Your {n} project aligns exactly with my expertise.\n\n\
                 {offer}\n\n\
                 ✅ 5+ years {n} experience\n\
                 ✅ 98% client satisfaction rate\n\
                 ✅ Fast turnaround guaranteed\n\
                 ✅ Clear communication throughout\n\n\
                 Ready to start immediately. When can we discuss your vision?"
            ),
            format!(
                "{greeting}!\n\n\
                 I love your project! Here's what I'd bring to your {n} needs:\n\n\
                 {offer}\n\n\
                 FREE BONUS: I'll include a comprehensive project audit and optimization recommendations at no extra cost.\n\n\
                 My approach: Understand → Strategize → Execute → Exceed expectations\n\n\
                 Interested in discussing how we can make this project exceptional?"
            ),
            format!(
                "{greeting}!\n\n\
                 Your {n} project caught my attention. Quick questions:\n\n\
                 1. What's your biggest concern with this project?\n\
                 2. What would success look like to you?\n\n\
                 {offer}\n\n\
                 I believe in understanding your vision completely before proposing solutions. Mind sharing your thoughts on these?"
            ),
        ],
        Platform::Instagram => [
            format!(
                "{greeting}! 🌟\n\n\
                 Your {n} content is fire! 🔥\n\n\
                 {offer}\n\n\
                 Think we could create something amazing together!\n\n\
                 DM me if you're interested! ✨"
            ),
            format!(
                "{greeting}! ✨\n\n\
                 Been following your {n} journey - you're crushing it! 📈\n\n\
                 {offer}\n\n\
                 Here's a free tip: Try [specific strategy] - saw 200% growth with similar accounts! 🚀\n\n\
                 Want more insights? Let's connect! 💫"
            ),
            format!(
                "{greeting}! 👋\n\n\
                 Love your {n} content! Quick question:\n\n\
                 What's your dream project you haven't tackled yet? 🤔\n\n\
                 {offer}\n\n\
                 Maybe we can make that dream project happen together? 🌟\n\n\
                 Drop me a DM! 📩"
            ),
        ],
    }
}
