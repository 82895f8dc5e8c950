use chrono::{TimeZone, Utc};
use givewise_core::Post;

struct DemoPost {
    id: &'static str,
    organization_id: &'static str,
    organization_name: &'static str,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    tags: [&'static str; 4],
    goal_amount: f64,
    current_amount: f64,
    day: u32,
}

const DEMO_POSTS: [DemoPost; 8] = [
    DemoPost {
        id: "demo_post_1",
        organization_id: "org_clean_water",
        organization_name: "Clean Water Now",
        title: "Help Us Build 10 New Wells in Rural Uganda",
        description: "We need your support to bring clean, safe drinking water to 5,000 people in rural Uganda. Each well costs $2,500 and serves an entire village. Your donation will help us reach our goal of building 10 new wells this quarter.",
        category: "Health",
        tags: ["water", "africa", "health", "community"],
        goal_amount: 25_000.0,
        current_amount: 8_750.0,
        day: 1,
    },
    DemoPost {
        id: "demo_post_2",
        organization_id: "org_coding_kids",
        organization_name: "Code For Kids",
        title: "Laptops for Oakland Students",
        description: "Help us provide 50 laptops to students in Oakland who don't have access to computers at home. These laptops will enable students to participate in our coding programs and complete their schoolwork.",
        category: "Education",
        tags: ["education", "technology", "youth", "oakland"],
        goal_amount: 15_000.0,
        current_amount: 6_200.0,
        day: 3,
    },
    DemoPost {
        id: "demo_post_3",
        organization_id: "org_tree_alliance",
        organization_name: "Urban Tree Alliance",
        title: "Plant 1,000 Trees in São Paulo",
        description: "Join us in greening São Paulo! We're planting 1,000 trees in low-canopy neighborhoods to reduce heat islands and improve air quality. Each tree costs $25 to plant and maintain.",
        category: "Environment",
        tags: ["trees", "climate", "urban", "brazil"],
        goal_amount: 25_000.0,
        current_amount: 18_250.0,
        day: 5,
    },
    DemoPost {
        id: "demo_post_4",
        organization_id: "org_emergency_relief",
        organization_name: "Rapid Relief Fund",
        title: "Emergency Relief for Flood Victims",
        description: "Recent floods have displaced thousands of families. We need immediate funds to provide food, shelter, and emergency supplies. Every dollar helps us reach more families in need.",
        category: "Emergency Relief",
        tags: ["disaster", "emergency", "floods", "relief"],
        goal_amount: 50_000.0,
        current_amount: 34_200.0,
        day: 7,
    },
    DemoPost {
        id: "demo_post_5",
        organization_id: "org_clean_water",
        organization_name: "Clean Water Now",
        title: "Water Filtration Systems for Schools",
        description: "We're installing water filtration systems in 20 schools across rural areas. This will ensure children have access to clean water during school hours and reduce waterborne illnesses.",
        category: "Health",
        tags: ["water", "schools", "children", "health"],
        goal_amount: 12_000.0,
        current_amount: 4_800.0,
        day: 10,
    },
    DemoPost {
        id: "demo_post_6",
        organization_id: "org_coding_kids",
        organization_name: "Code For Kids",
        title: "Summer Coding Camp Scholarships",
        description: "Help us provide 30 full scholarships for our summer coding camp. This intensive program teaches kids programming fundamentals and helps them build their first apps.",
        category: "Education",
        tags: ["education", "coding", "summer", "scholarships"],
        goal_amount: 9_000.0,
        current_amount: 3_150.0,
        day: 12,
    },
    DemoPost {
        id: "demo_post_7",
        organization_id: "org_tree_alliance",
        organization_name: "Urban Tree Alliance",
        title: "Community Garden Initiative",
        description: "We're creating 5 new community gardens in underserved neighborhoods. These gardens will provide fresh produce and green spaces for communities while teaching sustainable gardening practices.",
        category: "Environment",
        tags: ["gardening", "community", "sustainability", "food"],
        goal_amount: 18_000.0,
        current_amount: 11_250.0,
        day: 14,
    },
    DemoPost {
        id: "demo_post_8",
        organization_id: "org_emergency_relief",
        organization_name: "Rapid Relief Fund",
        title: "Winter Shelter Program",
        description: "As winter approaches, we need funds to provide warm shelter and supplies for families experiencing homelessness. Your donation will help us keep people safe and warm during the cold months.",
        category: "Emergency Relief",
        tags: ["homelessness", "winter", "shelter", "warmth"],
        goal_amount: 30_000.0,
        current_amount: 18_900.0,
        day: 16,
    },
];

/// The fundraising posts every user sees before anyone creates their own.
pub fn demo_posts() -> Vec<Post> {
    DEMO_POSTS
        .iter()
        .map(|demo| Post {
            id: demo.id.to_string(),
            organization_id: demo.organization_id.to_string(),
            organization_name: demo.organization_name.to_string(),
            title: demo.title.to_string(),
            description: demo.description.to_string(),
            category: Some(demo.category.to_string()),
            tags: demo.tags.iter().map(|tag| tag.to_string()).collect(),
            goal_amount: Some(demo.goal_amount),
            current_amount: demo.current_amount,
            created_at: Utc
                .with_ymd_and_hms(2024, 10, demo.day, 0, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            extra: Default::default(),
        })
        .collect()
}
