use tracing::debug;

use crate::festival::{Region, slug};

#[tracing::instrument]
pub fn map_location_to_region(location: &str) -> Region {
    let key = slug(location);

    let region = match key.as_str() {
        "mumbai" | "pune" | "nagpur" | "thane" | "nashik" | "aurangabad" | "solapur"
        | "kolhapur" => "maharashtra",

        "delhi" | "dehradun" | "haridwar" | "rishikesh" | "nainital" | "srinagar" | "jammu"
        | "leh" => "north_india",

        "bangalore" | "mysore" | "hubli" | "mangalore" | "belgaum" | "gulbarga" => "karnataka",

        "chennai" | "coimbatore" | "madurai" | "salem" | "tiruchirappalli" | "vellore"
        | "erode" | "tiruppur" => "tamil_nadu",

        "kolkata" | "howrah" | "durgapur" | "asansol" | "siliguri" | "bardhaman" => "west_bengal",

        "hyderabad" | "vijayawada" | "visakhapatnam" | "guntur" => "andhra_pradesh",

        "warangal" | "karimnagar" | "nizamabad" => "telangana",

        "ahmedabad" | "surat" | "vadodara" | "rajkot" | "bhavnagar" | "jamnagar" | "anand" => {
            "gujarat"
        }

        "chandigarh" | "amritsar" | "ludhiana" | "jalandhar" | "patiala" | "bathinda"
        | "mohali" => "punjab",

        "gurgaon" | "gurugram" | "faridabad" | "rohtak" | "hisar" | "panipat" | "karnal" => {
            "haryana"
        }

        "kochi" | "thiruvananthapuram" | "calicut" | "thrissur" | "kollam" | "alappuzha"
        | "palakkad" => "kerala",

        "guwahati" | "silchar" | "dibrugarh" | "jorhat" | "tezpur" => "assam",

        "bhubaneswar" | "cuttack" | "rourkela" | "berhampur" | "sambalpur" => "odisha",

        "patna" | "gaya" | "bhagalpur" | "muzaffarpur" | "purnia" => "bihar",

        "ranchi" | "jamshedpur" | "dhanbad" | "bokaro" | "hazaribagh" => "jharkhand",

        "bhopal" | "indore" | "jabalpur" | "gwalior" | "ujjain" => "madhya_pradesh",

        "raipur" | "bhilai" | "bilaspur" | "korba" => "chhattisgarh",

        "lucknow" | "kanpur" | "varanasi" | "allahabad" | "agra" | "ghaziabad" | "noida"
        | "meerut" | "bareilly" | "aligarh" => "uttar_pradesh",

        "jaipur" | "jodhpur" | "udaipur" | "bikaner" | "ajmer" | "kota" | "sikar" => "rajasthan",

        "panaji" | "margao" | "vasco" | "mapusa" => "goa",

        "shimla" | "manali" | "dharamshala" | "solan" => "himachal_pradesh",

        "imphal" | "shillong" | "kohima" | "itanagar" => "northeast",

        "aizawl" => "mizoram",

        "agartala" => "tripura",

        "gangtok" => "sikkim",

        _ => {
            debug!(location = %key, "location not in region table");
            return Region::all_india();
        }
    };

    Region::new(region)
}
