use crate::domain::profile::SkinProfile;

pub fn personalized_tips(profile: &SkinProfile) -> Vec<String> {
    let mut tips = Vec::new();
    let mut push = |tip: &str| tips.push(tip.to_string());

    if profile.has_lifestyle_factor("stress") {
        push(
            "High stress can trigger breakouts and inflammation. \
             A calming facial massage in the evening can help.",
        );
    }
    if profile.has_lifestyle_factor("sleep") {
        push(
            "Irregular sleep affects skin repair. \
             Keep your evening routine consistent to signal bedtime.",
        );
    }
    if profile.has_lifestyle_factor("exercise") {
        push("Cleanse soon after workouts so sweat and bacteria do not clog pores.");
    }
    if profile.has_lifestyle_factor("makeup") {
        push("Remove makeup fully before your evening cleanse so actives can reach the skin.");
    }
    if profile.has_lifestyle_factor("smoker") || profile.has_lifestyle_factor("smoking") {
        push(
            "Smoking accelerates collagen loss. \
             Antioxidant serums and daily SPF help offset the damage.",
        );
    }
    if profile.has_lifestyle_factor("travel") {
        push(
            "Frequent flying dehydrates skin. \
             Carry a travel-size moisturizer and reapply in flight.",
        );
    }

    match profile.climate.as_deref() {
        Some("hot-humid") => push(
            "In humid climates, favour lightweight gel textures \
             and keep blotting papers handy for shine.",
        ),
        Some("cold-dry") => push(
            "Cold weather strips moisture. Layer hydrating products and run a humidifier indoors.",
        ),
        _ => {}
    }

    if profile.sun_exposure.as_deref() == Some("high") {
        push(
            "With high sun exposure, reapply SPF every 2 hours \
             and wear a hat for extra protection.",
        );
    }

    if profile.has_concern("acne") {
        push("Change pillowcases often and avoid touching your face during the day.");
    }
    if profile.has_concern("aging") {
        push(
            "Consistency matters most for anti-aging care. \
             Results usually show after 8-12 weeks.",
        );
    }

    tips
}
