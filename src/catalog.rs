//! Static data shown in keyboards and used by the keyword heuristics.

use rand::seq::SliceRandom;

use crate::prompts::Category;

pub const LANGUAGES: [(&str, &str); 17] = [
    ("English", "en"),
    ("Hindi (हिन्दी)", "hi"),
    ("Tamil (தமிழ்)", "ta"),
    ("Telugu (తెలుగు)", "te"),
    ("Bengali (বাংলা)", "bn"),
    ("Marathi (मराठी)", "mr"),
    ("Gujarati (ગુજરાતી)", "gu"),
    ("Kannada (ಕನ್ನಡ)", "kn"),
    ("Malayalam (മലയാളം)", "ml"),
    ("Oriya (ଓଡ଼ିଆ)", "or"),
    ("Punjabi (ਪੰਜਾਬੀ)", "pa"),
    ("Romanized Hindi", "hi-ro"),
    ("Romanized Tamil", "ta-ro"),
    ("Romanized Telugu", "te-ro"),
    ("Romanized Bengali", "bn-ro"),
    ("Romanized Marathi", "mr-ro"),
    ("Romanized Gujarati", "gu-ro"),
];

/// Language name without the native-script suffix, e.g. "hi" -> "Hindi".
pub fn language_name(code: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|&(name, _)| name.split(" (").next().unwrap_or(name))
        .unwrap_or("Unknown")
}

pub fn language_code(label: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|&(_, code)| code)
}

pub fn native_language_hint(code: &str) -> &'static str {
    match code {
        "hi" => "आप मुझसे हिंदी में कोई भी प्रश्न पूछ सकते हैं।",
        "ta" => "நீங்கள் தமிழில் என்னிடம் எந்த கேள்வியும் கேட்கலாம்.",
        "te" => "మీరు తెలుగులో నన్ను ఏదైనా ప్రశ్నించవచ్చు.",
        "bn" => "আপনি আমাকে বাংলায় যেকোনো প্রশ্ন জিজ্ঞাসা করতে পারেন।",
        "mr" => "तुम्ही मला मराठीत कोणताही प्रश्न विचारू शकता.",
        "gu" => "તમે મને ગુજરાતીમાં કોઈપણ પ્રશ્ન પૂછી શકો છો.",
        "hi-ro" => "Aap mujhse Hindi me koi bhi prashn pooch sakte hain.",
        _ => "You can ask me questions in your native language.",
    }
}

pub const EXAMS: [&str; 6] = ["UPSC", "JEE", "NEET", "SSC", "Bank PO", "GATE"];

pub fn subjects(exam: &str) -> &'static [&'static str] {
    match exam {
        "UPSC" => &[
            "History",
            "Geography",
            "Politics",
            "Economics",
            "Indian Culture",
            "Current Affairs",
            "Environment & Ecology",
        ],
        "JEE" => &[
            "Maths",
            "Physics",
            "Chemistry",
            "Coordinate Geometry",
            "Calculus",
            "Modern Physics",
            "Organic Chemistry",
        ],
        "NEET" => &[
            "Biology",
            "Physics",
            "Chemistry",
            "Human Physiology",
            "Cell Biology",
            "Genetics",
            "Thermodynamics",
        ],
        "SSC" => &[
            "General Awareness",
            "Reasoning",
            "Quantitative Aptitude",
            "English Comprehension",
            "General Science",
        ],
        "Bank PO" => &[
            "Reasoning",
            "Quantitative Aptitude",
            "English",
            "Computer Awareness",
            "Banking Awareness",
            "Financial Management",
        ],
        "GATE" => &[
            "Computer Science",
            "Electronics",
            "Mechanical",
            "Civil",
            "Electrical",
            "Data Structures & Algorithms",
            "Operating Systems",
        ],
        _ => &[],
    }
}

/// First exam from `EXAMS` that appears in the text, case-insensitively.
pub fn find_exam(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    EXAMS
        .iter()
        .find(|exam| text.contains(&exam.to_lowercase()))
        .copied()
}

pub fn find_subject(exam: &str, text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    subjects(exam)
        .iter()
        .find(|subject| text.contains(&subject.to_lowercase()))
        .copied()
}

pub fn examples(category: Category) -> &'static [&'static str] {
    match category {
        Category::MathLogic => &[
            "Solve: 234 + 567 in Hindi",
            "क्या 15 और 25 का LCM बता सकते हैं?",
            "ஒரு வட்டத்தின் பரப்பளவை எவ்வாறு கணக்கிடுவது?",
        ],
        Category::Code => &[
            "Write a Python function to check for palindrome.",
            "বাইনারি সার্চ অ্যালগরিদম কীভাবে কাজ করে?",
            "પાયથોનમાં લિસ્ટ અને ટપલ વચ્ચે શું તફાવત છે?",
        ],
        Category::Culture => &[
            "Why is Diwali celebrated?",
            "महाराष्ट्रातील गणेश चतुर्थी उत्सवाचे महत्व काय आहे?",
            "తెలుగు సంస్కృతిలో బోనాల పండుగ ఎందుకు జరుపుకుంటారు?",
        ],
        Category::Regional => &[
            "कोकण किनारपट्टी के बारे में बताओ",
            "தமிழ்நாட்டு கோயில் கட்டிடக்கலை பற்றி விவரிக்கவும்",
            "দুর্গা পূজার তাৎপর্য কী?",
            "ગુજરાતી ઢોકળા બનાવવાની રીત",
        ],
        Category::Exam => &[
            "What is the UPSC syllabus for History?",
            "Generate a mock question for JEE Physics",
            "Which books should I study for NEET Biology?",
        ],
        Category::Default => &[],
    }
}

pub const TRENDING: [&str; 4] = [
    "What is Chandrayaan-3?",
    "Who is the current Prime Minister of India?",
    "Solve: 1234 * 5678",
    "Write a Python program for Fibonacci series.",
];

pub fn random_trending() -> &'static str {
    TRENDING
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TRENDING[0])
}

pub const REGIONS: [(&str, &[&str]); 4] = [
    (
        "North India",
        &["Delhi", "Uttar Pradesh", "Himachal Pradesh", "Punjab", "Haryana"],
    ),
    (
        "South India",
        &["Tamil Nadu", "Kerala", "Karnataka", "Andhra Pradesh", "Telangana"],
    ),
    (
        "East India",
        &["West Bengal", "Odisha", "Bihar", "Assam", "Jharkhand"],
    ),
    ("West India", &["Maharashtra", "Gujarat", "Rajasthan", "Goa"]),
];

pub fn states(region: &str) -> &'static [&'static str] {
    REGIONS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|&(_, states)| states)
        .unwrap_or(&[])
}

pub const REGIONAL_TOPICS: [(&str, &str); 14] = [
    ("Cuisines", "Traditional foods and cooking techniques specific to regions"),
    ("Festivals", "Local celebrations and their significance"),
    ("Art Forms", "Traditional arts, crafts, dance, and music"),
    ("History", "Regional historical events and personalities"),
    ("Languages", "Linguistic features and dialects"),
    ("Folk Tales", "Traditional stories and legends passed through generations"),
    ("Clothing", "Traditional attire and textiles of the region"),
    ("Architecture", "Distinctive building styles and monuments"),
    ("Literature", "Regional literary traditions, famous works and authors"),
    ("Music", "Traditional and contemporary musical forms and instruments"),
    ("Dance Forms", "Classical and folk dance traditions unique to regions"),
    ("Handicrafts", "Traditional crafts, techniques and their cultural significance"),
    ("Rituals", "Cultural and religious ceremonies and practices"),
    ("Medicines", "Traditional medicinal practices and herbal remedies"),
];
